mod batch;
mod cleanup;
mod lifecycle;
