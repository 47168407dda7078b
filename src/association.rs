use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// A research institution authors can be synthetically affiliated with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Association {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub funding: Option<String>,
}

impl Association {
    /// Mail domain derived from the website (scheme, `www.` and trailing `/` removed).
    pub fn domain(&self) -> &str {
        let site = self.website.as_deref().unwrap_or("").trim();
        let site = site
            .strip_prefix("https://")
            .or_else(|| site.strip_prefix("http://"))
            .unwrap_or(site);
        let site = site.strip_prefix("www.").unwrap_or(site);
        site.trim_end_matches('/')
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.country.clone().unwrap_or_default(),
            self.address.clone().unwrap_or_default(),
            self.website.clone().unwrap_or_default(),
            self.funding.clone().unwrap_or_default(),
        ]
    }
}

/// Institutions used when no side file is available.
const BUILTIN_ASSOCIATIONS: &[(&str, &str, &str)] = &[
    ("MIT", "USA", "www.mit.edu"),
    ("Politecnico di Milano", "Italy", "www.polimi.it"),
    ("CERN", "Switzerland", "www.cern.ch"),
    ("Max Planck Institute", "Germany", "www.mpg.de"),
    ("Harvard University", "USA", "www.harvard.edu"),
    ("Stanford University", "USA", "www.stanford.edu"),
    ("University of Cambridge", "United Kingdom", "www.cam.ac.uk"),
    ("Brookhaven National Laboratory", "USA", "www.bnl.gov"),
    ("Bell Laboratories", "USA", "www.bell-labs.com"),
    ("SLAC", "USA", "www.slac.stanford.edu"),
    ("Politecnico di Bari", "Italy", "www.poliba.it"),
    ("Universita La Sapienza", "Italy", "www.uniroma1.it"),
    ("CNR", "Italy", "www.cnr.it"),
    ("Fermilab", "USA", "www.fnal.gov"),
    ("University of Oxford", "United Kingdom", "www.ox.ac.uk"),
    ("University of California", "USA", "www.universityofcalifornia.edu"),
];

/// Finite, ordered pool of associations, loaded once per run.
#[derive(Debug, Clone)]
pub struct AssociationPool {
    associations: Vec<Association>,
}

impl AssociationPool {
    /// Assigns `assoc/<n>` ids by 1-based position. Fails on an empty pool.
    pub fn new(mut associations: Vec<Association>) -> Result<Self> {
        if associations.is_empty() {
            bail!("Association pool is empty");
        }
        for (i, association) in associations.iter_mut().enumerate() {
            association.id = format!("assoc/{}", i + 1);
        }
        Ok(Self { associations })
    }

    pub fn builtin() -> Self {
        let associations = BUILTIN_ASSOCIATIONS
            .iter()
            .enumerate()
            .map(|(i, (name, country, website))| Association {
                id: format!("assoc/{}", i + 1),
                name: name.to_string(),
                country: Some(country.to_string()),
                address: None,
                website: Some(website.to_string()),
                funding: None,
            })
            .collect();
        Self { associations }
    }

    /// Reads a JSON array of associations.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open association file: {:?}", path))?;
        let associations: Vec<Association> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse association file: {:?}", path))?;
        let pool = Self::new(associations)
            .with_context(|| format!("No associations in: {:?}", path))?;
        info!(associations = pool.len(), path = ?path, "Association pool loaded");
        Ok(pool)
    }

    /// Uniform random pick.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Association {
        // The pool is never empty, see `new`.
        self.associations
            .choose(rng)
            .unwrap_or(&self.associations[0])
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Association> {
        self.associations.iter()
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}
