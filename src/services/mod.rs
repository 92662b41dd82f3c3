pub mod ibroadcast;
