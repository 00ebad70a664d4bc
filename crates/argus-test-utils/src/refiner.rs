use argus_cpa::{Counterexample, ReachedSet, Refinement, RefinementError, Refiner};

/// A [`Refiner`] driven by a closure, recording every counterexample it was
/// shown.
pub struct ScriptedRefiner<F> {
    decide: F,
    seen: Vec<Counterexample>,
}

impl<F> ScriptedRefiner<F>
where
    F: FnMut(usize, &Counterexample, &ReachedSet) -> Result<Refinement, RefinementError>,
{
    /// `decide` receives the zero-based call number, the counterexample, and
    /// the reached set.
    pub fn new(decide: F) -> Self {
        Self {
            decide,
            seen: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.len()
    }

    pub fn counterexamples(&self) -> &[Counterexample] {
        &self.seen
    }
}

impl<F> Refiner for ScriptedRefiner<F>
where
    F: FnMut(usize, &Counterexample, &ReachedSet) -> Result<Refinement, RefinementError>,
{
    fn refine(
        &mut self,
        counterexample: &Counterexample,
        reached: &ReachedSet,
    ) -> Result<Refinement, RefinementError> {
        let call = self.seen.len();
        self.seen.push(counterexample.clone());
        (self.decide)(call, counterexample, reached)
    }
}
