//! texarray-export - texture array export tool
//!
//! Builds `.texarr` texture array resources from `.tex2darray` asset files,
//! and edits, checks and watches those asset files.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use texarray_common::inspector::{self, AnisotropicFiltering, RowStatus};
use texarray_common::{
    FilterMode, ImporterSettings, TargetPlatform, TextureHandle, WrapMode, verify_all,
};
use texarray_export::project::{self, WriteOutcome};
use texarray_export::watch::{FileWatcher, WatchEvent, WatchPaths};
use texarray_export::DiskResolver;

#[derive(Parser)]
#[command(name = "texarray-export")]
#[command(about = "Texture array export tool")]
#[command(version)]
struct Cli {
    /// Directory texture paths are relative to (default: the asset's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .texarr resource from a .tex2darray asset
    Build {
        /// Path to the .tex2darray asset
        asset: PathBuf,

        /// Output .texarr file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Platform to build for
        #[arg(short, long, value_enum, default_value_t = Target::Standalone)]
        target: Target,
    },

    /// Verify an asset without building; fails when any slice is invalid
    Check {
        asset: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Target::Standalone)]
        target: Target,
    },

    /// Show settings and per-slice status
    Inspect {
        asset: PathBuf,

        /// Project-wide anisotropic filtering setting
        #[arg(long, value_enum, default_value_t = Quality::PerTexture)]
        quality_aniso: Quality,
    },

    /// Change sampling settings or replace the texture list
    Set {
        asset: PathBuf,

        #[arg(long, value_enum)]
        wrap: Option<Wrap>,

        #[arg(long, value_enum)]
        filter: Option<Filter>,

        /// Anisotropic filtering level (0-16)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=16))]
        aniso: Option<u8>,

        /// Keep a CPU-readable copy of the pixel data
        #[arg(long)]
        readable: Option<bool>,

        /// Replace the whole texture list (all must exist on disk)
        #[arg(long, num_args = 0..)]
        textures: Option<Vec<PathBuf>>,
    },

    /// Append textures to the end of the list
    Add {
        asset: PathBuf,
        textures: Vec<PathBuf>,
    },

    /// Remove the slice at an index
    Remove { asset: PathBuf, index: usize },

    /// Assign a texture to the slice at an index
    Assign {
        asset: PathBuf,
        index: usize,
        texture: PathBuf,
    },

    /// Create a new, empty .tex2darray asset
    New {
        /// Directory to create the asset in
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Rebuild whenever the asset or one of its textures changes
    Watch {
        asset: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Target::Standalone)]
        target: Target,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Standalone,
    Gles3,
    Gles2,
    Webgl1,
}

impl From<Target> for TargetPlatform {
    fn from(target: Target) -> Self {
        match target {
            Target::Standalone => TargetPlatform::Standalone,
            Target::Gles3 => TargetPlatform::Gles3,
            Target::Gles2 => TargetPlatform::Gles2,
            Target::Webgl1 => TargetPlatform::WebGl1,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Wrap {
    Repeat,
    Clamp,
    Mirror,
    MirrorOnce,
}

impl From<Wrap> for WrapMode {
    fn from(wrap: Wrap) -> Self {
        match wrap {
            Wrap::Repeat => WrapMode::Repeat,
            Wrap::Clamp => WrapMode::Clamp,
            Wrap::Mirror => WrapMode::Mirror,
            Wrap::MirrorOnce => WrapMode::MirrorOnce,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    Point,
    Bilinear,
    Trilinear,
}

impl From<Filter> for FilterMode {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Point => FilterMode::Point,
            Filter::Bilinear => FilterMode::Bilinear,
            Filter::Trilinear => FilterMode::Trilinear,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Quality {
    Disable,
    PerTexture,
    ForceEnable,
}

impl From<Quality> for AnisotropicFiltering {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Disable => AnisotropicFiltering::Disable,
            Quality::PerTexture => AnisotropicFiltering::PerTexture,
            Quality::ForceEnable => AnisotropicFiltering::ForceEnable,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let resolver_for = |asset: &Path| {
        DiskResolver::new(cli.root.clone().unwrap_or_else(|| project::default_root(asset)))
    };

    match &cli.command {
        Commands::Build {
            asset,
            output,
            target,
        } => {
            let output = output.clone().unwrap_or_else(|| project::default_output(asset));
            build_once(asset, &output, &resolver_for(asset), (*target).into())?;
        }

        Commands::Check { asset, target } => {
            let resolver = resolver_for(asset);
            let settings = project::load_settings(asset)?;
            let target: TargetPlatform = (*target).into();
            let verification =
                verify_all(settings.textures(), target.supports_array_textures(), &resolver);

            if let Some(issue) = &verification.issue {
                tracing::error!("{}", issue.import_message(&asset.to_string_lossy()));
            }
            for (index, outcome) in verification.invalid_slices() {
                let message = texarray_common::verify::describe_outcome(
                    settings.textures(),
                    index,
                    outcome,
                    &resolver,
                );
                if !message.is_empty() {
                    tracing::error!("Slice {}: {}", index, message);
                }
            }

            if !verification.valid {
                anyhow::bail!("{} is not valid", asset.display());
            }
            tracing::info!("{} is valid!", asset.display());
        }

        Commands::Inspect {
            asset,
            quality_aniso,
        } => {
            let resolver = resolver_for(asset);
            let settings = project::load_settings(asset)?;
            print_inspection(&settings, &resolver, (*quality_aniso).into());
        }

        Commands::Set {
            asset,
            wrap,
            filter,
            aniso,
            readable,
            textures,
        } => {
            let resolver = resolver_for(asset);
            let mut settings = project::load_settings(asset)?;

            if let Some(wrap) = wrap {
                settings.set_wrap_mode((*wrap).into());
            }
            if let Some(filter) = filter {
                settings.set_filter_mode((*filter).into());
            }
            if let Some(aniso) = aniso {
                settings.set_aniso_level(*aniso);
            }
            if let Some(readable) = readable {
                settings.set_readable(*readable);
            }
            if let Some(textures) = textures {
                let handles: Vec<_> = textures
                    .iter()
                    .map(|path| Some(resolver.handle_for(path)))
                    .collect();
                settings.set_textures(Some(&handles), &resolver)?;
            }

            project::save_settings(asset, &settings)?;
            tracing::info!("Updated {}", asset.display());
        }

        Commands::Add { asset, textures } => {
            let resolver = resolver_for(asset);
            let mut settings = project::load_settings(asset)?;
            let handles: Vec<TextureHandle> =
                textures.iter().map(|path| resolver.handle_for(path)).collect();
            let count = handles.len();
            inspector::append_dropped(settings.textures_mut(), handles);
            project::save_settings(asset, &settings)?;
            tracing::info!("Added {} texture(s) to {}", count, asset.display());
        }

        Commands::Remove { asset, index } => {
            let mut settings = project::load_settings(asset)?;
            let removed = settings.textures_mut().remove_at(*index)?;
            project::save_settings(asset, &settings)?;
            match removed {
                Some(texture) => tracing::info!("Removed slice {} ({})", index, texture),
                None => tracing::info!("Removed empty slice {}", index),
            }
        }

        Commands::Assign {
            asset,
            index,
            texture,
        } => {
            let resolver = resolver_for(asset);
            let mut settings = project::load_settings(asset)?;
            let handle = resolver.handle_for(texture);
            let rejected =
                inspector::assign(settings.textures_mut(), *index, Some(handle), &resolver)?;
            project::save_settings(asset, &settings)?;
            if rejected.is_some() {
                anyhow::bail!("Slice {} was cleared", index);
            }
            tracing::info!("Assigned slice {}", index);
        }

        Commands::New { dir } => {
            let path = project::create_asset(dir)?;
            tracing::info!("Created {}", path.display());
        }

        Commands::Watch {
            asset,
            output,
            target,
        } => {
            let output = output.clone().unwrap_or_else(|| project::default_output(asset));
            watch(asset, &output, &resolver_for(asset), (*target).into())?;
        }
    }

    Ok(())
}

/// Import and write the resource; returns the dependencies of the build
fn build_once(
    asset: &Path,
    output: &Path,
    resolver: &DiskResolver,
    target: TargetPlatform,
) -> Result<Vec<PathBuf>> {
    tracing::info!("Building {:?} -> {:?}", asset, output);
    let result = project::import_asset(asset, resolver, target)?;

    match project::write_resource(output, &result.output.resource)? {
        WriteOutcome::Written => tracing::info!("Done!"),
        WriteOutcome::Unchanged => tracing::info!("Up to date"),
    }
    if !result.output.valid {
        tracing::warn!("{} was built with placeholder content", output.display());
    }

    Ok(result.output.dependencies)
}

fn watch(asset: &Path, output: &Path, resolver: &DiskResolver, target: TargetPlatform) -> Result<()> {
    loop {
        // A broken config must not end watch mode; wait for the next save instead
        let dependencies = match build_once(asset, output, resolver, target) {
            Ok(dependencies) => dependencies,
            Err(e) => {
                tracing::error!("{:#}", e);
                Vec::new()
            }
        };

        let paths = WatchPaths::new(asset, &dependencies);
        let watcher = FileWatcher::new(&paths)?;
        tracing::info!("Watching {} file(s)...", paths.count());

        match watcher.wait_for_changes() {
            WatchEvent::FilesChanged(files) => {
                tracing::info!("{} texture(s) changed, rebuilding", files.len());
            }
            WatchEvent::ConfigChanged => tracing::info!("Asset changed, rebuilding"),
            WatchEvent::Error(e) => anyhow::bail!(e),
        }
    }
}

fn print_inspection(
    settings: &ImporterSettings,
    resolver: &DiskResolver,
    quality: AnisotropicFiltering,
) {
    println!("Texture Type:  Texture Array");
    println!("Texture Shape: 2D");
    println!("Wrap Mode:     {:?}", settings.wrap_mode());
    println!("Filter Mode:   {:?}", settings.filter_mode());
    println!("Aniso Level:   {}", settings.aniso_level());
    if let Some(note) = inspector::aniso_advisory(settings.aniso_level(), quality) {
        println!("  note: {}", note);
    }
    println!("Read/Write:    {}", settings.readable());

    let textures = settings.textures();
    println!("Textures ({}):", textures.len());
    for (index, entry) in textures.iter().enumerate() {
        let name = entry.map(|t| t.key().to_string()).unwrap_or_else(|| "None".to_string());
        match inspector::row_status(textures, index, resolver) {
            RowStatus::Label(index) => println!("  {:>3}  {}", index, name),
            RowStatus::Error { message, .. } => {
                println!("    !  {}", name);
                println!("       {}", message);
            }
        }
    }
}
