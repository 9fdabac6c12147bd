pub mod suspension;
