use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use argus_cfa::Location;

/// One active call: which function was entered, from where, and where
/// control resumes when it returns.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallFrame {
    pub function: String,
    pub call_site: Location,
    pub return_site: Location,
}

#[derive(Debug)]
struct Link {
    frame: CallFrame,
    parent: Option<Arc<Link>>,
    depth: usize,
}

/// A persistent stack of [`CallFrame`]s.
///
/// Push and pop are O(1) and share the unchanged suffix, so successors of a
/// state keep pointing at the same frames as their predecessor. The empty
/// stack is the context of the program's main function.
#[derive(Clone, Default)]
pub struct CallStack {
    top: Option<Arc<Link>>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: CallFrame) -> Self {
        let depth = self.depth() + 1;
        Self {
            top: Some(Arc::new(Link {
                frame,
                parent: self.top.clone(),
                depth,
            })),
        }
    }

    /// The stack without its top frame, or `None` if it is empty.
    pub fn pop(&self) -> Option<Self> {
        self.top.as_ref().map(|link| Self {
            top: link.parent.clone(),
        })
    }

    pub fn top(&self) -> Option<&CallFrame> {
        self.top.as_ref().map(|link| &link.frame)
    }

    pub fn depth(&self) -> usize {
        self.top.as_ref().map_or(0, |link| link.depth)
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Frames from the innermost call outwards.
    pub fn frames(&self) -> impl Iterator<Item = &CallFrame> {
        let mut cursor = self.top.as_deref();
        std::iter::from_fn(move || {
            let link = cursor?;
            cursor = link.parent.as_deref();
            Some(&link.frame)
        })
    }
}

impl PartialEq for CallStack {
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.top.as_ref();
        let mut b = other.top.as_ref();
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.depth != y.depth || x.frame != y.frame {
                        return false;
                    }
                    a = x.parent.as_ref();
                    b = y.parent.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for CallStack {}

impl Hash for CallStack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth().hash(state);
        for frame in self.frames() {
            frame.hash(state);
        }
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames()).finish()
    }
}

impl fmt::Display for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames: Vec<_> = self.frames().collect();
        write!(f, "[")?;
        for (i, frame) in frames.iter().rev().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}@{}", frame.function, frame.call_site)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use argus_cfa::{CfaBuilder, Location};

    use super::*;

    fn locations() -> (Location, Location, Location) {
        let mut b = CfaBuilder::new();
        let main = b.function("main", &[]).unwrap();
        let mid = b.location("main").unwrap();
        (main.entry(), mid, main.exit())
    }

    fn frame(function: &str, call_site: Location, return_site: Location) -> CallFrame {
        CallFrame {
            function: function.to_string(),
            call_site,
            return_site,
        }
    }

    #[test]
    fn push_and_pop_share_structure() {
        let (a, b, c) = locations();
        let empty = CallStack::new();
        let one = empty.push(frame("f", a, b));
        let two = one.push(frame("g", b, c));

        assert_eq!(two.depth(), 2);
        assert_eq!(two.top().map(|f| f.function.as_str()), Some("g"));
        assert_eq!(two.pop(), Some(one.clone()));
        assert_eq!(one.pop(), Some(empty.clone()));
        assert_eq!(empty.pop(), None);
        assert_eq!(one.depth(), 1);
    }

    #[test]
    fn equality_is_structural() {
        let (a, b, _) = locations();
        let x = CallStack::new().push(frame("f", a, b));
        let y = CallStack::new().push(frame("f", a, b));
        let z = CallStack::new().push(frame("h", a, b));
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert_eq!(x.to_string(), "[f@N0]");
    }
}
