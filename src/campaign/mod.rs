//! The concrete campaign workflows built on the composition engine

pub mod assignment;
pub mod builders;
pub mod roles;

pub use assignment::AbAssignment;
pub use builders::{
    MarketingPipeline, MarketingPipelineBuilder, OutreachPipeline, OutreachPipelineBuilder,
    COPYWRITER_LEGAL_LOOP, COPYWRITER_LEGAL_SEQUENCE, OUTREACH_PIPELINE, REVIEWER_GROUP,
};
pub use roles::Role;
