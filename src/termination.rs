use crate::session::GridSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// Nothing is burning, so the remote engine cannot make progress
    Terminal,
}

pub fn assess(snapshot: &GridSnapshot) -> Verdict {
    if snapshot.burning_count() == 0 {
        Verdict::Terminal
    } else {
        Verdict::Continue
    }
}

pub fn is_terminal(snapshot: &GridSnapshot) -> bool {
    assess(snapshot) == Verdict::Terminal
}
