//! Creates a set of co-registered NetCDF volumes for trying out aggregate-volumes.
//!
//! Each volume holds a blurred sphere on a zero background with a
//! subject-specific intensity scale and noise, so inequality measures and
//! the entropy show visible structure at the sphere boundary.

use ndarray::Array3;
use netcdf::create;
use std::path::Path;

const NX: usize = 24;
const NY: usize = 24;
const NZ: usize = 16;
const SUBJECTS: usize = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for subject in 0..SUBJECTS {
        let name = format!("subject_{subject}.nc");
        let output_path = Path::new(&name);
        println!("🔨 Creating test volume: {}", output_path.display());

        if output_path.exists() {
            std::fs::remove_file(output_path)?
        }

        let mut file = create(output_path)?;
        file.add_attribute("title", "Synthetic co-registered volume")?;
        file.add_attribute("created_by", "create_test_volumes.rs")?;

        file.add_dimension("z", NZ)?;
        file.add_dimension("y", NY)?;
        file.add_dimension("x", NX)?;

        let scale = 100.0 + 25.0 * subject as f32;
        let radius = 6.0 + subject as f32 * 0.5;
        let data = Array3::from_shape_fn((NZ, NY, NX), |(k, j, i)| {
            let dx = i as f32 - NX as f32 / 2.0;
            let dy = j as f32 - NY as f32 / 2.0;
            let dz = k as f32 - NZ as f32 / 2.0;
            let r = (dx * dx + dy * dy + dz * dz).sqrt();
            if r > radius + 2.0 {
                0.0
            } else {
                // Deterministic texture standing in for noise
                let texture = ((i * 7 + j * 13 + k * 17 + subject * 31) % 11) as f32 - 5.0;
                scale / (1.0 + (r - radius).max(0.0)) + texture
            }
        });

        let mut var = file.add_variable::<f32>("intensity", &["z", "y", "x"])?;
        var.put_attribute("units", "a.u.")?;
        var.put_attribute("long_name", "image intensity")?;
        var.put(data.view(), ..)?;
    }

    println!("✅ Created {SUBJECTS} volumes of {NZ} × {NY} × {NX} voxels");
    println!("\n🧪 Try:");
    println!("   cargo run -- gini subject_*.nc --output gini.nc --padding 0 --normalization");
    println!("   cargo run -- mean subject_*.nc --output mean.nc --padding 0 --intersection");

    Ok(())
}
