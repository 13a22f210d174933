// Business domains
pub mod accounts;
pub mod alerts;
pub mod delivery;
pub mod jobs;
