//! The Firestore write operations each rule monitors.

/// Which receivers a monitored method call may have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverFilter {
    /// Every receiver.
    Any,
    /// Identifier receivers must be in the list; chained calls always match.
    AllowList(Vec<String>),
    /// The receiver must be a `doc(...)` or `x.doc(...)` call.
    DocumentCall,
}

/// Bare function names, method names and a receiver filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredOperations {
    pub functions: &'static [&'static str],
    pub methods: &'static [&'static str],
    pub receivers: ReceiverFilter,
}

impl MonitoredOperations {
    /// Every write that stores a payload: `setDoc`, `updateDoc`, `addDoc`
    /// and the `set` / `update` / `create` methods.
    ///
    /// A non-empty `additional_objects` restricts identifier receivers to
    /// those names.
    pub fn writes(additional_objects: &[String]) -> Self {
        let receivers = if additional_objects.is_empty() {
            ReceiverFilter::Any
        } else {
            ReceiverFilter::AllowList(additional_objects.to_vec())
        };

        Self {
            functions: &["setDoc", "updateDoc", "addDoc"],
            methods: &["set", "update", "create"],
            receivers,
        }
    }

    /// Writes that replace the whole document unless told to merge.
    pub fn overwriting_sets() -> Self {
        Self {
            functions: &["setDoc"],
            methods: &["set"],
            receivers: ReceiverFilter::DocumentCall,
        }
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(&name)
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.methods.contains(&name)
    }
}

/// The non-overwriting counterpart of an overwriting operation name.
pub fn update_variant(operation: &str) -> Option<&'static str> {
    match operation {
        "setDoc" => Some("updateDoc"),
        "set" => Some("update"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_receivers() {
        assert_eq!(MonitoredOperations::writes(&[]).receivers, ReceiverFilter::Any);
        let batch = vec!["batch".to_string()];
        assert_eq!(
            MonitoredOperations::writes(&batch).receivers,
            ReceiverFilter::AllowList(batch.clone())
        );
    }

    #[test]
    fn test_operation_names() {
        let writes = MonitoredOperations::writes(&[]);
        assert!(writes.is_function("addDoc"));
        assert!(writes.is_method("create"));
        assert!(!writes.is_function("set"));
        assert!(!writes.is_method("delete"));

        let sets = MonitoredOperations::overwriting_sets();
        assert!(sets.is_function("setDoc"));
        assert!(!sets.is_function("updateDoc"));
        assert!(!sets.is_method("update"));
    }

    #[test]
    fn test_update_variant() {
        assert_eq!(update_variant("setDoc"), Some("updateDoc"));
        assert_eq!(update_variant("set"), Some("update"));
        assert_eq!(update_variant("addDoc"), None);
    }
}
