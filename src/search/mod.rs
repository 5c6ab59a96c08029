// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod dijkstra;
mod one_to_many;

pub use dijkstra::Dijkstra;
pub use one_to_many::OneToMany;
