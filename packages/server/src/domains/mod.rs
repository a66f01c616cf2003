// Domain layers. Each domain owns its models, data access and activities.

pub mod equipment;
pub mod jobs;
pub mod routing;
pub mod scheduling;
pub mod technicians;
