use super::models::PollConfig;

/// Data attribute on the jobs container holding the endpoint to poll.
pub const JOBS_URL_ATTR: &str = "jobs-url";
/// Data attribute on the jobs container holding the optional job type filter.
pub const TYPE_FILTER_ATTR: &str = "type-filter";

/// The page the poller reconciles job status into.
///
/// Elements are addressed by id and are never created by the poller. Setters
/// on an id the page does not have must be no-ops.
pub trait Page: Send {
    /// Read a data attribute of the jobs container.
    fn data_attribute(&self, name: &str) -> Option<String>;

    /// Whether an element with this id exists.
    fn contains(&self, element_id: &str) -> bool;

    fn set_class(&mut self, element_id: &str, class: &str);

    fn set_style(&mut self, element_id: &str, style: &str);

    fn set_text(&mut self, element_id: &str, text: &str);

    fn set_disabled(&mut self, element_id: &str, disabled: bool);

    /// Discard the current view and load it again from scratch.
    fn reload(&mut self);

    /// Build the poll target from the container's data attributes.
    ///
    /// Returns `None` when no usable jobs url is present. Only a missing
    /// type filter attribute means no filter; an empty one is still sent.
    fn poll_config(&self) -> Option<PollConfig> {
        let jobs_url = self
            .data_attribute(JOBS_URL_ATTR)
            .filter(|url| !url.trim().is_empty())?;
        let type_filter = self.data_attribute(TYPE_FILTER_ATTR);

        Some(PollConfig {
            jobs_url,
            type_filter,
        })
    }
}
