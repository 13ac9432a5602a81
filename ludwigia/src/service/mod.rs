//! Services are the interface presented to clients: a service owns the shared data store and
//! turns one raw request blob into one raw response blob, whatever the transport. The
//! majority of the data handling lives in the input and signal modules; the logic here is the
//! sequencing of queries and mutations against shared state.

pub mod skye_v1;
