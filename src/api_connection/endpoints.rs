use crate::models::Dish;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

pub const ALL_DISHES_PATH: &str = "/api/getalldishes";
pub const PHOTOS_PATH: &str = "/api/photos";
pub const PLACEHOLDER_PHOTO: &str = "no-image.jpg";

/// Joins `base` and `path` with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub fn photo_file_name(dish: &Dish) -> String {
    if dish.has_photo {
        format!("dish_{}.jpg", dish.id)
    } else {
        PLACEHOLDER_PHOTO.to_string()
    }
}

/// Where the backend serves the dish photo, or the placeholder when the
/// dish has none.
pub fn photo_url(base: &str, dish: &Dish) -> String {
    join_url(base, &format!("{}/{}", PHOTOS_PATH, photo_file_name(dish)))
}
