//! Shop list, map and details state, kept consistent with the user location
//! and the search radius.

use crate::{
    geo::{self, LatLng, RadiusKm},
    query::ViewQuery,
    util::WrappingList,
    Shop,
};

pub const NO_DESCRIPTION: &str = "No additional description available.";

/// A shop shown in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// Index into [`Locator::shops`].
    pub shop: usize,
    /// Distance from the user, when the user location is known.
    pub distance_km: Option<f64>,
}

pub struct Locator {
    shops: Vec<Shop>,
    center: Option<LatLng>,
    radius: RadiusKm,
    visible: WrappingList<Entry>,
    details: Option<usize>,
}

pub struct Details<'a> {
    pub shop: &'a Shop,
    pub distance_km: Option<f64>,
}

impl<'a> Details<'a> {
    pub fn lines(&self) -> Vec<String> {
        let shop = self.shop;
        let mut lines = vec![
            shop.name.clone(),
            shop.address.clone(),
            format!("Rating: {} ⭐", shop.rating),
            format!("Phone: {}", shop.phone),
            format!("Availability: {}", shop.availability),
        ];

        if let Some(d) = self.distance_km {
            lines.push(format!("Distance: {}", format_km(d)));
        }

        lines.push(format!(
            "Description: {}",
            shop.description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(NO_DESCRIPTION)
        ));

        lines
    }
}

pub fn format_km(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.1} km")
    }
}

impl Locator {
    pub fn new(radius: RadiusKm) -> Self {
        Locator {
            shops: vec![],
            center: None,
            radius,
            visible: WrappingList::default(),
            details: None,
        }
    }

    pub fn shops(&self) -> &[Shop] {
        &self.shops
    }

    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    pub fn radius(&self) -> RadiusKm {
        self.radius
    }

    pub fn set_shops(&mut self, shops: Vec<Shop>) {
        let reindex = |old: Option<usize>, prev: &[Shop]| {
            let old = &prev[old?];
            shops
                .iter()
                .position(|s| s.name == old.name && s.location == old.location)
        };

        let selected = reindex(self.selected_shop_ix(), self.shops.as_slice());
        let details = reindex(self.details, self.shops.as_slice());

        self.shops = shops;
        self.details = details;
        self.refresh(selected);
    }

    /// Move the user. The cursor jumps to the nearest shop.
    pub fn set_center(&mut self, center: Option<LatLng>) {
        self.center = center;
        self.refresh(None);
    }

    pub fn set_radius(&mut self, radius: RadiusKm) {
        self.radius = radius;
        self.refresh(self.selected_shop_ix());
    }

    pub fn visible(&mut self) -> &mut WrappingList<Entry> {
        &mut self.visible
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Shop, Option<f64>)> + '_ {
        self.visible
            .iter()
            .map(move |e| (&self.shops[e.shop], e.distance_km))
    }

    pub fn is_visible(&self, shop: usize) -> bool {
        self.visible.iter().any(|e| e.shop == shop)
    }

    pub fn selected(&self) -> Option<(&Shop, Option<f64>)> {
        let e = self.visible.selected()?;
        Some((&self.shops[e.shop], e.distance_km))
    }

    pub fn selected_shop_ix(&self) -> Option<usize> {
        self.visible.selected().map(|e| e.shop)
    }

    pub fn up(&mut self) {
        self.visible.up();
    }

    pub fn down(&mut self) {
        self.visible.down();
    }

    /// Show the details of the highlighted shop.
    pub fn open_details(&mut self) -> Option<&Shop> {
        let ix = self.selected_shop_ix()?;
        tracing::debug!(shop = %self.shops[ix].name, "opening details");

        self.details = Some(ix);
        Some(&self.shops[ix])
    }

    /// Highlight and show the details of the nearest visible shop called `name`.
    pub fn open_by_name(&mut self, name: &str) -> bool {
        let shops = &self.shops;
        if !self.visible.select_where(|e| shops[e.shop].name == name) {
            tracing::debug!(name, "no visible shop to open");
            return false;
        }

        self.open_details().is_some()
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    pub fn details(&self) -> Option<Details<'_>> {
        let ix = self.details?;
        let distance_km = self
            .visible
            .iter()
            .find(|e| e.shop == ix)
            .and_then(|e| e.distance_km);

        Some(Details {
            shop: &self.shops[ix],
            distance_km,
        })
    }

    pub fn details_open(&self) -> bool {
        self.details.is_some()
    }

    /// The state to put in a shareable link.
    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            shop: self.details.map(|ix| self.shops[ix].name.clone()),
            at: self.center,
            radius: self.center.map(|_| self.radius),
        }
    }

    fn refresh(&mut self, keep: Option<usize>) {
        let entries: Vec<Entry> = match self.center {
            Some(center) => geo::within_radius(
                center,
                self.shops.iter().enumerate().map(|(i, s)| (s.location, i)),
                self.radius,
            )
            .into_iter()
            .map(|n| Entry {
                shop: n.item,
                distance_km: Some(n.distance_km),
            })
            .collect(),
            None => (0..self.shops.len())
                .map(|shop| Entry {
                    shop,
                    distance_km: None,
                })
                .collect(),
        };

        tracing::debug!(
            total = self.shops.len(),
            visible = entries.len(),
            radius = %self.radius,
            "refreshed shop list"
        );

        self.visible = WrappingList::new(entries);
        if let Some(keep) = keep {
            self.visible.select_where(|e| e.shop == keep);
        }

        if let Some(ix) = self.details {
            if !self.is_visible(ix) {
                tracing::debug!(shop = %self.shops[ix].name, "details closed, shop out of range");
                self.details = None;
            }
        }
    }
}
