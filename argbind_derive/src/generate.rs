mod field;
mod reflect;
