pub(crate) mod meta;
pub(crate) mod output;
pub(crate) mod run;
pub(crate) mod validate;
