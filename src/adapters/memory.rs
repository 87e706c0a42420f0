use std::collections::HashMap;

use crate::core::models::ElementKind;
use crate::core::page::Page;

/// State of a single page element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub class: String,
    pub style: String,
    pub text: String,
    pub disabled: bool,
}

/// Page backed by an in-memory element map.
#[derive(Debug, Default)]
pub struct MemoryPage {
    attributes: HashMap<String, String>,
    elements: HashMap<String, Element>,
    reloads: usize,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_rows<I>(mut self, job_ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in job_ids {
            self.add_row(id.as_ref());
        }
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Add the elements of one job row. The trigger starts disabled.
    pub fn add_row(&mut self, job_id: &str) {
        for kind in ElementKind::ALL {
            let element = Element {
                disabled: kind == ElementKind::TriggerButton,
                ..Default::default()
            };
            self.elements.insert(kind.element_id(job_id), element);
        }
    }

    pub fn remove_row(&mut self, job_id: &str) {
        for kind in ElementKind::ALL {
            self.elements.remove(&kind.element_id(job_id));
        }
    }

    pub fn clear_rows(&mut self) {
        self.elements.clear();
    }

    pub fn element(&self, element_id: &str) -> Option<&Element> {
        self.elements.get(element_id)
    }

    /// Ids of all jobs that have a status element, sorted.
    pub fn job_ids(&self) -> Vec<String> {
        let prefix = ElementKind::Status.prefix();
        let mut ids: Vec<String> = self
            .elements
            .keys()
            .filter_map(|id| id.strip_prefix(prefix))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }
}

impl Page for MemoryPage {
    fn data_attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn contains(&self, element_id: &str) -> bool {
        self.elements.contains_key(element_id)
    }

    fn set_class(&mut self, element_id: &str, class: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.class = class.to_string();
        }
    }

    fn set_style(&mut self, element_id: &str, style: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.style = style.to_string();
        }
    }

    fn set_text(&mut self, element_id: &str, text: &str) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.text = text.to_string();
        }
    }

    fn set_disabled(&mut self, element_id: &str, disabled: bool) {
        if let Some(element) = self.elements.get_mut(element_id) {
            element.disabled = disabled;
        }
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PollConfig;

    #[test]
    fn rows_provide_every_element() {
        let page = MemoryPage::new().with_rows(["42"]);

        for kind in ElementKind::ALL {
            assert!(page.contains(&kind.element_id("42")));
        }
        assert!(page.element("trigger-button-42").unwrap().disabled);
        assert_eq!(page.job_ids(), vec!["42".to_string()]);
    }

    #[test]
    fn setters_on_missing_elements_are_noops() {
        let mut page = MemoryPage::new();
        page.set_text("job-status-1", "OK");
        page.set_disabled("trigger-button-1", false);
        assert!(!page.contains("job-status-1"));
    }

    #[test]
    fn poll_config_reads_container_attributes() {
        let mut page = MemoryPage::new()
            .with_attribute("jobs-url", "http://host/internal/jobs")
            .with_attribute("type-filter", "import");

        assert_eq!(
            page.poll_config(),
            Some(PollConfig {
                jobs_url: "http://host/internal/jobs".to_string(),
                type_filter: Some("import".to_string()),
            })
        );

        page.set_attribute("type-filter", "");
        assert_eq!(page.poll_config().unwrap().type_filter.as_deref(), Some(""));

        page.remove_attribute("type-filter");
        assert_eq!(page.poll_config().unwrap().type_filter, None);

        page.remove_attribute("jobs-url");
        assert_eq!(page.poll_config(), None);
    }

    #[test]
    fn remove_row_drops_all_elements() {
        let mut page = MemoryPage::new().with_rows(["1", "2"]);
        page.remove_row("1");
        assert_eq!(page.job_ids(), vec!["2".to_string()]);
        assert!(!page.contains("job-runtime-1"));
    }
}
