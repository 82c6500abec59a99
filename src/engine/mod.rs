//! Supervised engine layer.
//!
//! Everything that touches the external database-connectivity engine lives
//! here:
//! - Configuration synthesis (declarative file resolution, dialect synthesis)
//! - Environment variable mapping for the child process
//! - Process lifecycle and the two transport channels

pub mod channel;
pub mod envmap;
pub mod supervisor;
pub mod synth;

pub use channel::{EngineChannel, RemoteChannel};
pub use envmap::engine_env;
pub use supervisor::{EngineMode, EngineSettings, EngineSupervisor};
pub use synth::{resolve_file, substitute_str, synthesize, EnvMap};
