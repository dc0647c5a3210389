//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the deployed database schema exactly. They
//! are used by Diesel for compile-time query validation and type-safe SQL
//! generation.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique email address with a lowercase-normalized domain.
        email -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Argon2id hash in PHC string format.
        password_hash -> Text,
        is_active -> Bool,
        is_staff -> Bool,
        is_superuser -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued bearer tokens, stored as SHA-256 fingerprints.
    access_tokens (fingerprint) {
        /// Hex-encoded SHA-256 of the issued token.
        fingerprint -> Varchar,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recipe tags, owned per user.
    tags (id) {
        id -> Int8,
        user_id -> Uuid,
        name -> Varchar,
    }
}

diesel::table! {
    /// Recipe ingredients, owned per user.
    ingredients (id) {
        id -> Int8,
        user_id -> Uuid,
        name -> Varchar,
    }
}

diesel::table! {
    /// Recipes with scalar fields; associations live in the link tables.
    recipes (id) {
        id -> Int8,
        user_id -> Uuid,
        title -> Varchar,
        time_minutes -> Int4,
        /// Fixed-point price with two fractional digits.
        price -> Numeric,
        link -> Nullable<Varchar>,
        image_path -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Recipe-to-tag association.
    recipe_tags (recipe_id, tag_id) {
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    /// Recipe-to-ingredient association.
    recipe_ingredients (recipe_id, ingredient_id) {
        recipe_id -> Int8,
        ingredient_id -> Int8,
    }
}

diesel::joinable!(access_tokens -> users (user_id));
diesel::joinable!(tags -> users (user_id));
diesel::joinable!(ingredients -> users (user_id));
diesel::joinable!(recipes -> users (user_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    access_tokens,
    tags,
    ingredients,
    recipes,
    recipe_tags,
    recipe_ingredients,
);
