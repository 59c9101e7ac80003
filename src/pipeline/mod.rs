//! Generation Pipeline
//!
//! The two-phase documentation workflow plus grounded chat:
//!
//! 1. **Plan** ([`DocPlanner`]): structural planning, intent-aware and
//!    idempotent against the document store.
//! 2. **Content** ([`ContentGenerator`]): an explicit sequential queue
//!    draining `Planned` pages in plan order.
//! 3. **Chat** ([`answer_in_context`]): streamed answers over published
//!    pages.

pub mod chat;
pub mod content;
pub mod planner;

pub use chat::answer_in_context;
pub use content::{ContentGenerator, RunSummary};
pub use planner::{DocPlanner, PlanIntent, PlanOutcome};
