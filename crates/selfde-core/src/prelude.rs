//! Common module for library exports

pub use crate::controller::ControllerState;
pub use crate::error::{MachError, RegisterError, SelfdeError, SelfdeResult};
pub use crate::exception::{ExceptionClass, ExceptionMask, ExceptionRecord};
pub use crate::feature::{self, VectorLayout};
pub use crate::monitor::{ExceptionEndpoint, ExceptionKernel, MonitorOptions};
#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
pub use crate::platform::macos::*;
pub use crate::registers::{
    GenericRole, RegisterCatalog, RegisterContext, RegisterDescriptor, RegisterId, RegisterMarshaler, RegisterSetId,
};
pub use crate::types::{PortName, TaskId, ThreadId};
