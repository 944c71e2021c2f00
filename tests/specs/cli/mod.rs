mod help;
mod output;
