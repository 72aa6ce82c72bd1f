pub mod price;
pub mod weekly_change;
