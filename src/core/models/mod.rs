pub mod audit;
pub mod balance;
pub mod expense;
pub mod group;
pub mod profile;
pub mod settlement;

pub use audit::{AppLog, GroupAudit};
pub use balance::{Balance, BalanceSummary, NetBalance, Transfer};
pub use expense::{Expense, ExpenseSplit, SplitType};
pub use group::Group;
pub use profile::Profile;
pub use settlement::Settlement;
