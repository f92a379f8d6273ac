use shopfinder::{
    filter::{CarFilter, NO_MODELS},
    geo::{LatLng, RadiusKm},
    locator::Locator,
    query::ViewQuery,
    Car, Place, Shop,
};

const CARS: &str = r#"[
    {
        "name": "Audi",
        "imgSrc": "https://cdn.example.com/audi.png",
        "carModels": [{ "name": "A4" }, { "name": "Q7" }]
    },
    { "name": "Lada", "imgSrc": "https://cdn.example.com/lada.png", "carModels": null },
    { "name": "Tesla" }
]"#;

const SHOPS: &str = r#"[
    {
        "name": "Meisterwerkstatt",
        "address": "102 Huntington Street, Brooklyn, NY",
        "rating": 4.6,
        "phone": "(347) 727-1913",
        "availability": "Fri, Nov 1 at 9 am",
        "location": { "lat": 40.6782, "lng": -73.9442 }
    },
    {
        "name": "Key Auto Center",
        "address": "240 Green St, Brooklyn, NY",
        "rating": 4.9,
        "phone": "(718) 690-7940",
        "availability": "Mon, Nov 4 at 8 am",
        "location": { "lat": 40.7128, "lng": -74.006 }
    },
    {
        "name": "Car Experts",
        "address": "120 5th Ave, Brooklyn, NY",
        "rating": 4.8,
        "phone": "(718) 234-5678",
        "availability": "Tue, Nov 5 at 10 am",
        "location": { "lat": 40.7128, "lng": -74.0061 }
    },
    {
        "name": "Car Experts",
        "address": "120 5th Ave, Brooklyn, NY",
        "rating": 4.8,
        "phone": "(718) 234-5678",
        "availability": "Tue, Nov 5 at 10 am",
        "description": "Riga branch",
        "location": { "lat": 56.96983479279139, "lng": 24.1578652520115 }
    }
]"#;

const PLACES: &str = r#"[
    {
        "place_id": 297712145,
        "licence": "Data © OpenStreetMap contributors, ODbL 1.0.",
        "osm_type": "relation",
        "osm_id": 175905,
        "lat": "40.7127281",
        "lon": "-74.0060152",
        "class": "boundary",
        "type": "administrative",
        "display_name": "City of New York, New York, United States",
        "importance": 1.0175766114518
    }
]"#;

fn shops() -> Vec<Shop> {
    serde_json::from_str(SHOPS).unwrap()
}

#[test]
fn decodes_cars() {
    let cars: Vec<Car> = serde_json::from_str(CARS).unwrap();

    assert_eq!(cars.len(), 3);
    assert_eq!(cars[0].car_models.len(), 2);
    assert_eq!(
        cars[0].img_src.as_deref(),
        Some("https://cdn.example.com/audi.png")
    );
    assert!(cars[1].car_models.is_empty());
    assert!(cars[2].car_models.is_empty());
    assert!(cars[2].img_src.is_none());
}

#[test]
fn decodes_shops() {
    let shops = shops();

    assert_eq!(shops.len(), 4);
    assert_eq!(shops[1].location, LatLng::new(40.7128, -74.006).unwrap());
    assert_eq!(shops[0].description, None);
    assert_eq!(shops[3].description.as_deref(), Some("Riga branch"));
}

#[test]
fn decodes_places() {
    let places: Vec<Place> = serde_json::from_str(PLACES).unwrap();

    let at = places[0].location().unwrap();
    assert!((at.lat - 40.7127).abs() < 1e-3);
    assert!((at.lng + 74.006).abs() < 1e-3);
}

#[test]
fn filter_from_payload() {
    let mut filter = CarFilter::new();
    filter.set_cars(serde_json::from_str(CARS).unwrap());

    filter.brands().down();
    assert_eq!(filter.select_brand(), Some("Lada"));
    assert_eq!(filter.model_labels(), [NO_MODELS]);
}

#[test]
fn nearby_shops_from_payload() {
    let places: Vec<Place> = serde_json::from_str(PLACES).unwrap();

    let mut locator = Locator::new(RadiusKm::new(10.0).unwrap());
    locator.set_shops(shops());
    locator.set_center(Some(places[0].location().unwrap()));

    let found: Vec<_> = locator
        .entries()
        .map(|(s, d)| (s.name.as_str(), d.unwrap()))
        .collect();

    assert_eq!(found.len(), 3);
    assert_eq!(found[2].0, "Meisterwerkstatt");
    assert!(found.windows(2).all(|w| w[0].1 <= w[1].1));
    assert!((found[2].1 - 6.48).abs() < 0.2);
}

#[test]
fn restores_view_from_link() {
    let view = ViewQuery::parse("?shop=Car+Experts&at=40.7128,-74.006&radius=inf").unwrap();

    let mut locator = Locator::new(view.radius.unwrap());
    locator.set_center(view.at);
    locator.set_shops(shops());

    // the nearest of the two shops with that name
    assert!(locator.open_by_name(view.shop.as_deref().unwrap()));
    let details = locator.details().unwrap();
    assert_eq!(details.shop.address, "120 5th Ave, Brooklyn, NY");
    assert!(details.distance_km.unwrap() < 0.1);

    assert_eq!(locator.query(), view);
    assert_eq!(
        locator.query().to_query_string(),
        "?shop=Car+Experts&at=40.7128%2C-74.006&radius=inf"
    );

    locator.close_details();
    assert_eq!(
        locator.query().to_query_string(),
        "?at=40.7128%2C-74.006&radius=inf"
    );
}
