pub mod skye_v1;
