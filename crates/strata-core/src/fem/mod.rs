//! Finite-element engine.
//!
//! Each layer is meshed through its thickness with two-node linear elements;
//! the in-plane dependence e^{−j·kx·x} is carried analytically. Fluid-like
//! layers are discretised in pressure, elastic layers in displacement
//! (ux, uz) and poroelastic layers in the mixed (u, p) formulation.
//!
//! Unknown 0 is the reflection coefficient; a semi-infinite termination adds
//! the transmitted amplitude as the last unknown.

pub mod assembly;
pub mod element;
pub mod multipliers;

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SolverError;
use crate::solver::System;
use crate::stack::{PoreCondition, StackState};
use assembly::Triplets;
use multipliers::{multipliers, PhysicalMultipliers};

/// Through-thickness mesh density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    pub elements_per_wavelength: f64,
    pub min_elements: usize,
    pub max_elements: usize,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            elements_per_wavelength: 24.0,
            min_elements: 6,
            max_elements: 400,
        }
    }
}

impl MeshOptions {
    /// Number of elements across `thickness` for the shortest wave of
    /// wavenumber `wavenumber`.
    pub fn elements(&self, thickness: f64, wavenumber: f64) -> usize {
        let lo = self.min_elements.max(1);
        let hi = self.max_elements.max(lo);
        let wanted = (thickness * wavenumber / (2.0 * PI) * self.elements_per_wavelength).ceil();
        if wanted.is_finite() && wanted >= 0.0 {
            (wanted as usize).clamp(lo, hi)
        } else {
            hi
        }
    }
}

/// Unknowns of one node.
#[derive(Debug, Clone, Copy)]
struct Node {
    /// Frame or solid displacement (ux, uz).
    u: Option<(usize, usize)>,
    /// Acoustic or pore pressure.
    p: Option<usize>,
    /// Weight of the pore pressure in the total stress, poroelastic only.
    beta: Option<Complex64>,
}

#[derive(Debug)]
struct LayerMesh {
    physics: PhysicalMultipliers,
    /// Element length.
    length: f64,
    nodes: usize,
    ux: Vec<usize>,
    uz: Vec<usize>,
    p: Vec<usize>,
    front: PoreCondition,
}

impl LayerMesh {
    fn has_displacement(&self) -> bool {
        !matches!(self.physics, PhysicalMultipliers::Acoustic { .. })
    }

    fn has_pressure(&self) -> bool {
        !matches!(self.physics, PhysicalMultipliers::Elastic { .. })
    }

    fn is_poroelastic(&self) -> bool {
        matches!(self.physics, PhysicalMultipliers::Poroelastic { .. })
    }

    fn node(&self, index: usize) -> Node {
        Node {
            u: self.ux.get(index).copied().zip(self.uz.get(index).copied()),
            p: self.p.get(index).copied(),
            beta: match self.physics {
                PhysicalMultipliers::Poroelastic { pressure_weight, .. } => Some(pressure_weight),
                _ => None,
            },
        }
    }

    fn first(&self) -> Node {
        self.node(0)
    }

    fn last(&self) -> Node {
        self.node(self.nodes - 1)
    }
}

/// Hands out unknown numbers, reusing the previous layer's last node where
/// the field is continuous.
struct Numbering {
    next: usize,
}

impl Numbering {
    fn field(&mut self, nodes: usize, shared: Option<usize>) -> Vec<usize> {
        let mut dofs = Vec::with_capacity(nodes);
        if let Some(dof) = shared {
            dofs.push(dof);
        }
        while dofs.len() < nodes {
            dofs.push(self.next);
            self.next += 1;
        }
        dofs
    }
}

fn mesh(state: &StackState, options: &MeshOptions) -> (Vec<LayerMesh>, usize) {
    let mut numbering = Numbering { next: 1 };
    let mut meshes: Vec<LayerMesh> = Vec::with_capacity(state.layers.len());
    for layer in &state.layers {
        let elements = options.elements(layer.thickness, layer.state.max_wavenumber());
        let nodes = elements + 1;
        let mut current = LayerMesh {
            physics: multipliers(&layer.state),
            length: layer.thickness / elements as f64,
            nodes,
            ux: Vec::new(),
            uz: Vec::new(),
            p: Vec::new(),
            front: layer.front,
        };
        let previous = meshes.last();
        let share_u = previous.is_some_and(|prev| prev.has_displacement() && current.has_displacement());
        let share_p = previous.is_some_and(|prev| {
            prev.has_pressure()
                && current.has_pressure()
                && (layer.front == PoreCondition::Open || !(prev.is_poroelastic() || current.is_poroelastic()))
        });
        let shared = previous.map(|prev| prev.last());

        if current.has_displacement() {
            let (sx, sz) = match shared.and_then(|n| n.u) {
                Some((x, z)) if share_u => (Some(x), Some(z)),
                _ => (None, None),
            };
            current.ux = numbering.field(nodes, sx);
            current.uz = numbering.field(nodes, sz);
        }
        if current.has_pressure() {
            let sp = shared.and_then(|n| n.p).filter(|_| share_p);
            current.p = numbering.field(nodes, sp);
        }
        meshes.push(current);
    }
    (meshes, numbering.next)
}

fn add_solid(
    t: &mut Triplets,
    (ua, ub): ((usize, usize), (usize, usize)),
    (a, b): (usize, usize),
    kx: Complex64,
    (lambda, mu, inertia): (Complex64, Complex64, Complex64),
    q: &element::Block,
    h: &element::Block,
) {
    let j = Complex64::new(0.0, 1.0);
    let c = element::gradient();
    let kx2 = kx * kx;
    let p_mod = lambda + 2.0 * mu;
    t.add(ua.0, ub.0, p_mod * kx2 * q[a][b] + mu * h[a][b] - inertia * q[a][b]);
    t.add(ua.1, ub.1, p_mod * h[a][b] + mu * kx2 * q[a][b] - inertia * q[a][b]);
    t.add(ua.0, ub.1, j * kx * (lambda * c[a][b] - mu * c[b][a]));
    t.add(ua.1, ub.0, j * kx * (mu * c[a][b] - lambda * c[b][a]));
}

fn assemble_layer(t: &mut Triplets, layer: &LayerMesh, kx: Complex64) {
    let j = Complex64::new(0.0, 1.0);
    let kx2 = kx * kx;
    let q = element::mass(layer.length);
    let h = element::stiffness(layer.length);
    let c = element::gradient();

    for e in 0..layer.nodes - 1 {
        for a in 0..2 {
            for b in 0..2 {
                let (na, nb) = (e + a, e + b);
                match layer.physics {
                    PhysicalMultipliers::Acoustic { stiffness, mass } => {
                        t.add(layer.p[na], layer.p[nb], stiffness * (h[a][b] + kx2 * q[a][b]) - mass * q[a][b]);
                    }
                    PhysicalMultipliers::Elastic { lambda, mu, inertia } => {
                        let u = ((layer.ux[na], layer.uz[na]), (layer.ux[nb], layer.uz[nb]));
                        add_solid(t, u, (a, b), kx, (lambda, mu, inertia), &q, &h);
                    }
                    PhysicalMultipliers::Poroelastic {
                        lambda_hat,
                        shear,
                        inertia,
                        fluid_stiffness,
                        fluid_mass,
                        coupling,
                        ..
                    } => {
                        let u = ((layer.ux[na], layer.uz[na]), (layer.ux[nb], layer.uz[nb]));
                        add_solid(t, u, (a, b), kx, (lambda_hat, shear, inertia), &q, &h);
                        let (pa, pb) = (layer.p[na], layer.p[nb]);
                        t.add(layer.ux[na], pb, j * kx * coupling * q[a][b]);
                        t.add(layer.uz[na], pb, -coupling * c[a][b]);
                        t.add(pa, layer.ux[nb], -j * kx * coupling * q[a][b]);
                        t.add(pa, layer.uz[nb], -coupling * c[b][a]);
                        t.add(pa, pb, fluid_stiffness * (h[a][b] + kx2 * q[a][b]) - fluid_mass * q[a][b]);
                    }
                }
            }
        }
    }
}

/// Boundary terms of a poroelastic face with outward normal `normal`: the
/// in-vacuo frame stress differs from the total stress by β·p, and the
/// fluid flux carries β·u_n.
fn pore_pressure_terms(t: &mut Triplets, node: Node, normal: f64) {
    if let (Some((_, uz)), Some(p), Some(beta)) = (node.u, node.p, node.beta) {
        t.add(uz, p, -beta * normal);
        t.add(p, uz, -beta * normal);
    }
}

/// Pressure `p` loading a displacement face of outward normal `normal`, and
/// that face's normal motion feeding the fluid flux of `p`.
fn fluid_load(t: &mut Triplets, uz: usize, p: usize, normal: f64) {
    let n = Complex64::new(normal, 0.0);
    t.add(uz, p, n);
    t.add(p, uz, n);
}

fn couple(t: &mut Triplets, left: &LayerMesh, right: &LayerMesh) {
    let (a, b) = (left.last(), right.first());
    pore_pressure_terms(t, a, 1.0);
    pore_pressure_terms(t, b, -1.0);
    match (left.has_displacement(), right.has_displacement()) {
        (true, false) => {
            if let (Some((_, uz)), Some(p)) = (a.u, b.p) {
                fluid_load(t, uz, p, 1.0);
            }
        }
        (false, true) => {
            if let (Some((_, uz)), Some(p)) = (b.u, a.p) {
                fluid_load(t, uz, p, -1.0);
            }
        }
        _ => {}
    }
}

/// A face opening onto a semi-infinite fluid whose pressure and normal
/// displacement at the face are `pressure + X` and
/// `displacement + coefficient·X` for the amplitude unknown `X`.
struct Port {
    unknown: usize,
    normal: f64,
    pressure: Complex64,
    displacement: Complex64,
    coefficient: Complex64,
    pores: PoreCondition,
}

fn open_port(t: &mut Triplets, node: Node, port: &Port) {
    let one = Complex64::new(1.0, 0.0);
    let x = port.unknown;
    let n = port.normal;
    let open = match (node.u, node.p) {
        (None, Some(p)) => Some(p),
        (Some((_, uz)), Some(p)) if port.pores == PoreCondition::Open => {
            pore_pressure_terms(t, node, n);
            fluid_load(t, uz, p, n);
            Some(p)
        }
        // outer pressure loads the face, normal displacement continuous
        (Some((_, uz)), _) => {
            pore_pressure_terms(t, node, n);
            t.add(uz, x, Complex64::new(n, 0.0));
            t.add_rhs(uz, -n * port.pressure);
            t.add(x, uz, one);
            t.add(x, x, -port.coefficient);
            t.add_rhs(x, port.displacement);
            None
        }
        (None, None) => None,
    };
    // pressure continuous, outer displacement feeds the flux
    if let Some(p) = open {
        t.add(x, p, one);
        t.add(x, x, -one);
        t.add_rhs(x, port.pressure);
        t.add(p, x, -n * port.coefficient);
        t.add_rhs(p, n * port.displacement);
    }
}

/// Assembles the global finite-element system of a stack.
pub(crate) fn assemble(state: &StackState, options: &MeshOptions) -> Result<System, SolverError> {
    let (omega, kx) = (state.omega, state.kx);
    let j = Complex64::new(0.0, 1.0);
    let (meshes, interior) = mesh(state, options);
    let (first, last) = match (meshes.first(), meshes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SolverError::Shape { rows: 0, unknowns: 0 }),
    };
    let transmission = state.transmitted.map(|_| interior);
    let size = interior + usize::from(transmission.is_some());
    let mut t = Triplets::new(size);

    for layer in &meshes {
        assemble_layer(&mut t, layer, kx);
    }
    for pair in meshes.windows(2) {
        couple(&mut t, &pair[0], &pair[1]);
    }

    // incident wave of unit amplitude plus the reflected one
    let w2 = omega * omega;
    let k3 = state.incident.normal_wavenumber(omega, kx);
    let c = -j * k3 / (w2 * state.incident.density);
    let front = Port {
        unknown: 0,
        normal: -1.0,
        pressure: Complex64::new(1.0, 0.0),
        displacement: c,
        coefficient: -c,
        pores: first.front,
    };
    open_port(&mut t, first.first(), &front);

    match (state.transmitted, transmission) {
        (Some(fluid), Some(unknown)) => {
            let k3t = fluid.normal_wavenumber(omega, kx);
            let back = Port {
                unknown,
                normal: 1.0,
                pressure: Complex64::new(0.0, 0.0),
                displacement: Complex64::new(0.0, 0.0),
                coefficient: -j * k3t / (w2 * fluid.density),
                pores: PoreCondition::Open,
            };
            open_port(&mut t, last.last(), &back);
        }
        _ => {
            if let Some((ux, uz)) = last.last().u {
                t.fix(ux);
                t.fix(uz);
            }
        }
    }

    trace!(unknowns = size, entries = t.len(), "finite-element system assembled");
    let (matrix, rhs) = t.to_dense();
    Ok(System::Linear {
        matrix,
        rhs,
        reflection: 0,
        transmission,
    })
}
