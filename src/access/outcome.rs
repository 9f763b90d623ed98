/// Result of a remote check. `notice` is set when the listing could not be
/// fetched and `value` is the fail-closed default rather than an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub value: bool,
    pub notice: Option<String>,
}

impl CheckOutcome {
    pub fn observed(value: bool) -> Self { Self { value, notice: None } }

    pub fn fail_closed(value: bool, notice: impl Into<String>) -> Self { Self { value, notice: Some(notice.into()) } }

    pub fn is_degraded(&self) -> bool { self.notice.is_some() }
}
