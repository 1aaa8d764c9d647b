use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    collections (id) {
        id -> BigInt,
        name -> Text,
        created_date -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> BigInt,
        name -> Text,
    }
}

table! {
    ads (id) {
        id -> BigInt,
        name -> Text,
        #[sql_name = "type"]
        ad_type -> Text,
        short_description -> Text,
        description -> Text,
        image_url -> Text,
        seller_id -> BigInt,
        location_distance -> Double,
        status -> Text,
        collection_id -> BigInt,
        created_date -> Timestamptz,
    }
}

table! {
    offers (id) {
        id -> BigInt,
        #[sql_name = "type"]
        offer_type -> Text,
        price -> Nullable<BigInt>,
        source_ads_id -> Nullable<BigInt>,
        target_ads_id -> BigInt,
        owner_id -> BigInt,
        status -> Text,
        created_date -> Timestamptz,
    }
}

table! {
    user_activities (id) {
        id -> BigInt,
        user_id -> BigInt,
        ads_id -> BigInt,
        action_type -> Text,
        created_date -> Timestamptz,
    }
}

joinable!(ads -> users (seller_id));
joinable!(ads -> collections (collection_id));
joinable!(offers -> users (owner_id));
joinable!(user_activities -> users (user_id));
joinable!(user_activities -> ads (ads_id));

allow_tables_to_appear_in_same_query!(
    collections,
    users,
    ads,
    offers,
    user_activities,
);
