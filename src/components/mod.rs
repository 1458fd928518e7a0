pub mod topology_canvas;
