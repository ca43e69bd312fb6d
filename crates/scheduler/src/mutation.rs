//! Mutation channel message (spec §4.G): the only way API-side code
//! reaches the engine. Published after a successful store write.

use ecss_core::Job;

#[derive(Debug, Clone)]
pub enum Mutation {
    Create(Job),
    Update(Job),
    Delete(String),
    Pause(String),
    Resume(String),
}

impl Mutation {
    pub fn job_id(&self) -> &str {
        match self {
            Mutation::Create(job) | Mutation::Update(job) => &job.id,
            Mutation::Delete(id) | Mutation::Pause(id) | Mutation::Resume(id) => id,
        }
    }
}
