pub mod legend;
pub mod map_view;
pub mod popup;
pub mod region_selector;
