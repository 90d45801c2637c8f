//! Concrete command payloads. Each one knows how to apply and revert itself
//! against a [`Scene`](seg_scene::Scene); [`Command`](crate::Command) adds the
//! shared header and dispatch.

mod multi;
mod object;
mod scene;
mod transform;
mod update;
mod value;

pub use multi::MultiCmds;
pub use object::{AddObject, MoveObject, RemoveObject};
pub use scene::{SetScene, SetUuid};
pub use transform::{SetPosition, SetRotation, SetScale};
pub use update::UpdateObject;
pub use value::SetValue;
