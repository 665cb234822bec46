pub mod campaign;
pub mod game_tester;
pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use campaign::{CampaignAggregate, CampaignRecord, aggregate_campaigns, run_campaign_analysis};
pub use game_tester::GameTester;
pub use scenarios::{get_scenario, list_scenarios, scenario_keys};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
