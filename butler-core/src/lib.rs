// ABOUTME: Transport-free core of the butler: intent matching, dispatch, relay and scheduling
// ABOUTME: Gears and surfaces plug in through traits; nothing here does network I/O

pub mod dispatcher;
pub mod gear;
pub mod gears;
pub mod intents;
pub mod matcher;
pub mod result;
pub mod scheduler;
pub mod surface;
pub mod surface_registry;

pub use dispatcher::{DispatchObserver, Dispatcher, NO_GEAR_MESSAGE, RELAY_FAILURE_NOTICE};
pub use gear::{param_str, require_params, Gear, Params};
pub use gears::{EchoMessageGear, NotifyAdminGear, SendMessageGear};
pub use matcher::infer_intent_and_params;
pub use result::{ExecutionResult, Outcome};
pub use scheduler::{ScheduledTask, TaskOutput, TaskScheduler};
pub use surface::{NotifyAdminSurface, Surface, SurfaceMessage};
pub use surface_registry::SurfaceRegistry;
