pub mod month;
pub mod session;
pub mod slots;

pub use month::MealPlanStore;
pub use session::PlannerSession;
pub use slots::{reassign_for_reduction, MealCount};
