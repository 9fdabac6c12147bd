pub mod suspension_service;
