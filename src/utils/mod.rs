pub mod sub_categories;
