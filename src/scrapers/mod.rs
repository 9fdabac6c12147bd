pub mod base;
pub mod paging;

pub mod bse;
pub mod eastmoney;
pub mod sse;
pub mod szse;
