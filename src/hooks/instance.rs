//! Resource-registration hook

use crate::dom::path::{generate_id, kebab_case, normalize_path, normalize_segment};
use crate::dom::{ResourceDescriptor, ResourceKind};
use crate::error::HookError;
use crate::hooks::frame::HookFrame;
use crate::reactive::OutputStore;
use crate::render::Props;
use crate::types::Outputs;
use crate::value::{OutputRef, OutputValue, Value};
use std::fmt;
use std::sync::Arc;

/// Read-tracking view of a registered resource
///
/// Output reads always reflect the live output map, which stays empty until the resource
/// has been materialized. Every read made during a render is recorded so the reading
/// fiber can be re-rendered when the value changes.
#[derive(Clone)]
pub struct InstanceHandle {
    id: String,
    kind: &'static str,
    outputs: Arc<OutputStore>,
}

impl InstanceHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Current value of an output, recording the read
    pub fn output(&self, key: &str) -> Option<serde_json::Value> {
        let output = OutputRef::new(self.id.clone(), key);
        HookFrame::record_read(&output);
        self.outputs.get(&output)
    }

    /// Current value of an output as a tagged value, recording the read
    ///
    /// Storing the result in a state slot binds that slot to the output.
    pub fn output_ref(&self, key: &str) -> Value {
        let source = OutputRef::new(self.id.clone(), key);
        HookFrame::record_read(&source);
        let value = self.outputs.get(&source);
        Value::Output(OutputValue { source, value })
    }

    /// All outputs currently known, recording a read of each
    pub fn outputs(&self) -> Outputs {
        let outputs = self.outputs.resource(&self.id);
        for key in outputs.keys() {
            HookFrame::record_read(&OutputRef::new(self.id.clone(), key.clone()));
        }
        outputs
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Register a resource of `kind` under the active fiber
///
/// The local id is the explicit key when one is given, otherwise the kebab-cased kind name,
/// suffixed `-1`, `-2`, ... for the second and later instances of the same kind in this
/// component. Lifecycle callbacks come from the component's own props.
pub fn use_instance(kind: &ResourceKind, props: Props) -> Result<InstanceHandle, HookError> {
    HookFrame::with_active("use_instance", |frame| {
        let index = frame.next_instance_index(kind.name());
        let local_id = match props.explicit_key() {
            Some(key) => key.to_string(),
            None if index == 0 => kebab_case(kind.name()),
            None => format!("{}-{}", kebab_case(kind.name()), index),
        };

        // Blank local ids are dropped by the builder and never resolve to the parent's id
        let local_is_empty = normalize_segment(&local_id).is_empty();
        let mut path = frame.resource_prefix().to_vec();
        path.push(local_id);
        let id = if local_is_empty {
            String::new()
        } else {
            generate_id(&normalize_path(&path))
        };

        frame.push_resource(ResourceDescriptor {
            kind: kind.name().to_string(),
            path,
            props: props.snapshot(),
            required: kind.required(),
            lifecycle: frame.lifecycle().clone(),
            owner: frame.fiber(),
            component_path: frame.component_path().to_string(),
        });

        InstanceHandle {
            id,
            kind: kind.name(),
            outputs: frame.runtime().outputs.clone(),
        }
    })
}
