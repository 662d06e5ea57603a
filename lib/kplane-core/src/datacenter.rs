//! Datacenter catalog as seen by API users
//!
//! Datacenters may be restricted to callers from given email domains. For
//! everyone else such a datacenter does not exist: it is left out of listings
//! and a direct lookup answers not found.

use crate::{CoreError, Result};
use kplane_api::v1::{
    ApiUser, CreateDatacenterRequest, Datacenter, DatacenterSpec, DatacenterView,
    DatacenterViewMeta, DatacenterViewSpec,
};
use kplane_api::Seed;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Read view over all seeds and their datacenters
pub struct DatacenterCatalog {
    seeds: BTreeMap<String, Seed>,
}

impl DatacenterCatalog {
    pub fn new(seeds: impl IntoIterator<Item = Seed>) -> Self {
        let seeds = seeds
            .into_iter()
            .map(|seed| (seed.seed_name().to_string(), seed))
            .collect();
        Self { seeds }
    }

    /// All datacenters visible to `user` plus one entry per seed, sorted by name
    pub fn list(&self, user: &ApiUser) -> Vec<DatacenterView> {
        let mut views: Vec<DatacenterView> = self
            .datacenter_views()
            .filter(|view| is_visible(user, &view.spec.spec))
            .chain(self.seeds.keys().map(|name| seed_view(name)))
            .collect();
        views.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        views
    }

    pub fn get(&self, user: &ApiUser, name: &str) -> Result<DatacenterView> {
        self.list(user)
            .into_iter()
            .find(|view| view.name() == name)
            .ok_or_else(|| not_found(name))
    }

    /// Visible datacenters running on `provider`; seed entries are never included
    pub fn list_for_provider(&self, user: &ApiUser, provider: &str) -> Vec<DatacenterView> {
        let mut views: Vec<DatacenterView> = self
            .datacenter_views()
            .filter(|view| view.spec.provider == provider)
            .filter(|view| is_visible(user, &view.spec.spec))
            .collect();
        views.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        views
    }

    pub fn get_for_provider(
        &self,
        user: &ApiUser,
        provider: &str,
        name: &str,
    ) -> Result<DatacenterView> {
        self.list_for_provider(user, provider)
            .into_iter()
            .find(|view| view.name() == name)
            .ok_or_else(|| not_found(name))
    }

    /// Add a datacenter to the seed named in the path.
    ///
    /// Returns the updated seed; persisting it is up to the caller.
    pub fn create(
        &self,
        user: &ApiUser,
        path_seed: &str,
        request: CreateDatacenterRequest,
    ) -> Result<(Seed, DatacenterView)> {
        if !user.is_admin {
            return Err(CoreError::Authorization(format!(
                "forbidden: {:?} doesn't have admin rights",
                user.email
            )));
        }

        let CreateDatacenterRequest { name, spec } = request;
        if spec.seed != path_seed {
            return Err(CoreError::BadRequest(format!(
                "path seed {:?} and request seed {:?} not equal",
                path_seed, spec.seed
            )));
        }

        spec.spec.provider()?;

        let Some(seed) = self.seeds.get(path_seed) else {
            return Err(CoreError::BadRequest(format!(
                "seed {:?} does not exist",
                path_seed
            )));
        };

        if self.name_taken(&name) {
            return Err(CoreError::Duplicate(format!(
                "datacenter {:?} already exists",
                name
            )));
        }

        let datacenter = Datacenter {
            country: spec.country.clone(),
            location: spec.location.clone(),
            node: spec.node.clone(),
            spec: spec.spec.clone(),
        };
        let mut updated = seed.clone();
        updated.spec.datacenters.insert(name.clone(), datacenter);

        info!(seed = %path_seed, datacenter = %name, "Created datacenter");
        let view = DatacenterView {
            metadata: DatacenterViewMeta { name },
            spec,
            is_seed: false,
        };
        Ok((updated, view))
    }

    fn name_taken(&self, name: &str) -> bool {
        self.seeds.contains_key(name) || self.seeds.values().any(|seed| seed.has_datacenter(name))
    }

    fn datacenter_views(&self) -> impl Iterator<Item = DatacenterView> + '_ {
        self.seeds.iter().flat_map(|(seed_name, seed)| {
            seed.spec
                .datacenters
                .iter()
                .map(move |(name, dc)| datacenter_view(seed_name, name, dc))
        })
    }
}

fn datacenter_view(seed: &str, name: &str, dc: &Datacenter) -> DatacenterView {
    let provider = dc
        .spec
        .provider()
        .map(|p| p.kind().to_string())
        .unwrap_or_default();
    DatacenterView {
        metadata: DatacenterViewMeta {
            name: name.to_string(),
        },
        spec: DatacenterViewSpec {
            seed: seed.to_string(),
            country: dc.country.clone(),
            location: dc.location.clone(),
            provider,
            node: dc.node.clone(),
            spec: dc.spec.clone(),
        },
        is_seed: false,
    }
}

fn seed_view(name: &str) -> DatacenterView {
    DatacenterView {
        metadata: DatacenterViewMeta {
            name: name.to_string(),
        },
        is_seed: true,
        ..Default::default()
    }
}

fn is_visible(user: &ApiUser, spec: &DatacenterSpec) -> bool {
    if user.is_admin {
        return true;
    }
    let domains = spec.required_email_domains();
    if domains.is_empty() {
        return true;
    }
    let email = user.email.to_ascii_lowercase();
    let allowed = domains
        .iter()
        .any(|domain| email.ends_with(&format!("@{}", domain.to_ascii_lowercase())));
    if !allowed {
        debug!(user = %user.email, "Datacenter hidden by email domain restriction");
    }
    allowed
}

fn not_found(name: &str) -> CoreError {
    CoreError::NotFound(format!("datacenter {:?} not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kplane_api::v1::datacenter::{DatacenterSpecDigitalocean, DatacenterSpecFake};
    use kplane_api::v1::SeedSpec;

    fn admin() -> ApiUser {
        ApiUser {
            name: "admin".to_string(),
            email: "admin@acme.com".to_string(),
            is_admin: true,
        }
    }

    fn bob() -> ApiUser {
        ApiUser {
            name: "Bob".to_string(),
            email: "bob@acme.com".to_string(),
            is_admin: false,
        }
    }

    fn john() -> ApiUser {
        ApiUser {
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            is_admin: false,
        }
    }

    fn fake_dc(country: &str) -> Datacenter {
        Datacenter {
            country: country.to_string(),
            location: "Amsterdam".to_string(),
            spec: DatacenterSpec {
                fake: Some(DatacenterSpecFake::default()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn catalog() -> DatacenterCatalog {
        let mut datacenters = BTreeMap::new();
        datacenters.insert("fake-dc".to_string(), fake_dc("Germany"));

        let mut restricted = fake_dc("NL");
        restricted.spec.required_email_domain = Some("example.com".to_string());
        datacenters.insert("restricted-fake-dc".to_string(), restricted);

        let mut restricted_list = fake_dc("NL");
        restricted_list.spec.required_email_domains = vec![
            "23f67weuc.com".to_string(),
            "example.com".to_string(),
            "12noifsdsd.org".to_string(),
        ];
        datacenters.insert("restricted-fake-dc2".to_string(), restricted_list);

        datacenters.insert(
            "regular-do1".to_string(),
            Datacenter {
                country: "NL".to_string(),
                location: "Amsterdam".to_string(),
                spec: DatacenterSpec {
                    digitalocean: Some(DatacenterSpecDigitalocean {
                        region: "ams2".to_string(),
                    }),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        DatacenterCatalog::new([Seed::new(
            "us-central1",
            SeedSpec {
                datacenters,
                ..Default::default()
            },
        )])
    }

    fn names(views: &[DatacenterView]) -> Vec<&str> {
        views.iter().map(|v| v.name()).collect()
    }

    #[test]
    fn test_admin_lists_everything_sorted() {
        let views = catalog().list(&admin());
        assert_eq!(
            names(&views),
            vec![
                "fake-dc",
                "regular-do1",
                "restricted-fake-dc",
                "restricted-fake-dc2",
                "us-central1"
            ]
        );
        assert!(views.last().unwrap().is_seed);
    }

    #[test]
    fn test_regular_user_does_not_see_restricted() {
        let views = catalog().list(&bob());
        assert_eq!(names(&views), vec!["fake-dc", "regular-do1", "us-central1"]);
    }

    #[test]
    fn test_get_restricted_datacenter() {
        let catalog = catalog();
        assert!(catalog.get(&admin(), "restricted-fake-dc").is_ok());
        assert!(catalog.get(&john(), "restricted-fake-dc").is_ok());

        let err = catalog.get(&bob(), "restricted-fake-dc").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "datacenter \"restricted-fake-dc\" not found");
    }

    #[test]
    fn test_list_for_provider() {
        let catalog = catalog();
        assert_eq!(
            names(&catalog.list_for_provider(&bob(), "fake")),
            vec!["fake-dc"]
        );
        assert_eq!(
            names(&catalog.list_for_provider(&admin(), "fake")),
            vec!["fake-dc", "restricted-fake-dc", "restricted-fake-dc2"]
        );
        assert!(catalog.list_for_provider(&bob(), "idontexist").is_empty());
    }

    #[test]
    fn test_get_for_provider() {
        let catalog = catalog();
        assert!(catalog
            .get_for_provider(&bob(), "digitalocean", "regular-do1")
            .is_ok());
        assert!(catalog
            .get_for_provider(&bob(), "idontexist", "regular-do1")
            .is_err());
        assert!(catalog
            .get_for_provider(&bob(), "fake", "restricted-fake-dc")
            .is_err());
    }

    fn create_request(name: &str, seed: &str) -> CreateDatacenterRequest {
        CreateDatacenterRequest {
            name: name.to_string(),
            spec: DatacenterViewSpec {
                seed: seed.to_string(),
                country: "NL".to_string(),
                location: "Amsterdam".to_string(),
                spec: DatacenterSpec {
                    digitalocean: Some(DatacenterSpecDigitalocean::default()),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_admin_creates_datacenter() {
        let (seed, view) = catalog()
            .create(&admin(), "us-central1", create_request("do-correct", "us-central1"))
            .unwrap();
        assert!(seed.has_datacenter("do-correct"));
        assert_eq!(view.name(), "do-correct");
    }

    #[test]
    fn test_create_rejections() {
        let catalog = catalog();

        let err = catalog
            .create(&bob(), "us-central1", create_request("do-correct", "us-central1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "forbidden: \"bob@acme.com\" doesn't have admin rights");

        let err = catalog
            .create(&admin(), "us-central1", create_request("regular-do1", "us-central1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "datacenter \"regular-do1\" already exists");

        let err = catalog
            .create(&admin(), "idontexist", create_request("regular-do1", "idontexist"))
            .unwrap_err();
        assert_eq!(err.to_string(), "seed \"idontexist\" does not exist");

        let err = catalog
            .create(&admin(), "different", create_request("regular-do1", "us-central1"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "path seed \"different\" and request seed \"us-central1\" not equal"
        );
    }

    #[test]
    fn test_create_requires_exactly_one_provider() {
        let catalog = catalog();

        let mut none = create_request("private-do1", "us-central1");
        none.spec.spec.digitalocean = None;
        let err = catalog.create(&admin(), "us-central1", none).unwrap_err();
        assert_eq!(err.to_string(), "one DC provider should be specified, got: []");

        let mut both = create_request("private-do1", "us-central1");
        both.spec.spec.aws = Some(Default::default());
        let err = catalog.create(&admin(), "us-central1", both).unwrap_err();
        assert_eq!(
            err.to_string(),
            "one DC provider should be specified, got: [aws digitalocean]"
        );
    }
}
