pub mod vector_ops;
