//! Multi-call workflows on top of a [`GenerativeService`](crate::service::GenerativeService).

mod affiliate;
mod analysis;
mod assist;
mod group;
mod image_batch;
mod structured;
mod video;

pub use affiliate::{generate_affiliate_sets, MAX_MODEL_IMAGES};
pub use analysis::analyze_movement;
pub use assist::{dialogue_script, prompt_feedback, smart_suggestions, FEEDBACK_FALLBACK};
pub use group::ConcurrencyGroup;
pub use image_batch::generate_pose_batch;
pub use structured::{
    generate_structured_prompt, parse_structured_response, validate_structured_request,
    StructuredOutcome,
};
pub use video::generate_video;
