mod control;
mod recovery;
mod worker;
