pub mod distance_matrix;
