// Purpose - external interfaces: port values handed over by the host

pub mod port;

pub use port::Input;
