use std::fmt;

/// Counters collected by the reachability algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachabilityStatistics {
    /// Waitlist pops.
    pub iterations: usize,
    /// Composite successors computed by the transfer relation.
    pub successors: usize,
    /// Merges that changed an existing state.
    pub merges: usize,
    /// Successors absorbed into a merged node.
    pub absorbed: usize,
    /// Successors covered on arrival.
    pub covered: usize,
    /// Successors dropped by precision adjustment.
    pub breaks: usize,
    /// Breaks that made the result incomplete.
    pub cutoffs: usize,
    pub targets: usize,
    pub max_waitlist: usize,
    pub refinements: usize,
}

impl fmt::Display for ReachabilityStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "iterations:   {}", self.iterations)?;
        writeln!(f, "successors:   {}", self.successors)?;
        writeln!(f, "merges:       {}", self.merges)?;
        writeln!(f, "absorbed:     {}", self.absorbed)?;
        writeln!(f, "covered:      {}", self.covered)?;
        writeln!(f, "breaks:       {}", self.breaks)?;
        writeln!(f, "cutoffs:      {}", self.cutoffs)?;
        writeln!(f, "targets:      {}", self.targets)?;
        writeln!(f, "max waitlist: {}", self.max_waitlist)?;
        write!(f, "refinements:  {}", self.refinements)
    }
}

/// Write-only collector for statistics, called once after each verification.
pub trait StatisticsSink {
    fn record(&mut self, statistics: &ReachabilityStatistics);
}

impl<F: FnMut(&ReachabilityStatistics)> StatisticsSink for F {
    fn record(&mut self, statistics: &ReachabilityStatistics) {
        self(statistics)
    }
}
