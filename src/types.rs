use std::sync::{Arc, Mutex};

use crate::computer::Computer;

pub type SharedComputer = Arc<Mutex<Computer>>;
