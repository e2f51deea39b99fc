//! Polyconic. Slot 5 is the latitude of origin.

use crate::error::ProjResult;
use crate::params::Common;
use crate::util::{adjust_lon, asinz, e0fn, e1fn, e2fn, e3fn, mlfn, msfnz, phi4z};

#[derive(Debug, Clone)]
pub struct Polyconic {
    r_major: f64,
    center_lon: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    es: f64,
    e0: f64,
    e1: f64,
    e2: f64,
    e3: f64,
    ml0: f64,
}

impl Polyconic {
    pub(crate) fn new(common: &Common) -> ProjResult<Self> {
        let es = common.es();
        let (e0, e1, e2, e3) = (e0fn(es), e1fn(es), e2fn(es), e3fn(es));
        Ok(Self {
            r_major: common.r_major(),
            center_lon: common.center_lon,
            false_easting: common.false_easting,
            false_northing: common.false_northing,
            e: es.sqrt(),
            es,
            e0,
            e1,
            e2,
            e3,
            ml0: mlfn(e0, e1, e2, e3, common.center_lat),
        })
    }

    pub(crate) fn forward(&self, lon: f64, lat: f64) -> ProjResult<(f64, f64)> {
        let con = adjust_lon(lon - self.center_lon);
        if lat.abs() <= 0.0000001 {
            return Ok((
                self.false_easting + self.r_major * con,
                self.false_northing - self.r_major * self.ml0,
            ));
        }

        let (sinphi, cosphi) = lat.sin_cos();
        let ml = mlfn(self.e0, self.e1, self.e2, self.e3, lat);
        let ms = msfnz(self.e, sinphi, cosphi);
        let con = con * sinphi;
        Ok((
            self.false_easting + self.r_major * ms * con.sin() / sinphi,
            self.false_northing + self.r_major * (ml - self.ml0 + ms * (1.0 - con.cos()) / sinphi),
        ))
    }

    pub(crate) fn inverse(&self, x: f64, y: f64) -> ProjResult<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let al = self.ml0 + y / self.r_major;
        if al.abs() <= 0.0000001 {
            return Ok((x / self.r_major + self.center_lon, 0.0));
        }

        let b = al * al + (x / self.r_major) * (x / self.r_major);
        let (lat, c) = phi4z(self.es, self.e0, self.e1, self.e2, self.e3, al, b)?;
        let lon = adjust_lon(asinz(x * c / self.r_major) / lat.sin() + self.center_lon);
        Ok((lon, lat))
    }
}
