use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::{fmt, sync::Arc};

/// Navigation intent attached to a toast. The store never looks inside it;
/// the presentation layer decides what `target` means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickAction {
    pub target: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ClickAction {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            params: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A button rendered on the toast card.
#[derive(Clone)]
pub struct ActionButton {
    /// User-visible label for the button
    pub label: String,
    on_invoke: Arc<dyn Fn() + Send + Sync>,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, on_invoke: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            on_invoke: Arc::new(on_invoke),
        }
    }

    /// Run the button's callback.
    pub fn invoke(&self) {
        (self.on_invoke)()
    }
}

impl fmt::Debug for ActionButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionButton")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// Only the label crosses the wire; the callback stays in process.
impl Serialize for ActionButton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActionButton", 1)?;
        state.serialize_field("label", &self.label)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_click_action_params() {
        let action = ClickAction::new("invoices/detail")
            .with_param("id", 42)
            .with_param("tab", "payments");

        assert_eq!(action.target, "invoices/detail");
        assert_eq!(action.params["id"], 42);
        assert_eq!(action.params["tab"], "payments");
    }

    #[test]
    fn test_click_action_params_default_when_missing() {
        let action: ClickAction = serde_json::from_str(r#"{ "target": "home" }"#).unwrap();
        assert!(action.params.is_empty());
    }

    #[test]
    fn test_action_button_invoke() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let button = ActionButton::new("Undo", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        button.invoke();
        button.clone().invoke();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_action_button_serializes_label_only() {
        let button = ActionButton::new("View", || {});
        let json = serde_json::to_string(&button).unwrap();
        assert_eq!(json, r#"{"label":"View"}"#);
    }

    #[test]
    fn test_action_button_debug_format() {
        let button = ActionButton::new("Open", || {});
        let debug_str = format!("{:?}", button);
        assert!(debug_str.contains("ActionButton"));
        assert!(debug_str.contains("Open"));
    }
}
