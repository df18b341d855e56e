pub mod accrual_scheduler;
