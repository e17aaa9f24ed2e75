pub mod st;
