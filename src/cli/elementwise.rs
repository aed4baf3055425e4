use std::path::PathBuf;
use std::process;

use clap::{Args, ValueEnum};

use ckw::{
    create_kernel_writer, BinaryOp, ConstantData, DataType, Kernel, KernelWriter,
    ScopedKernelWriter, TargetLanguage, TensorDataLayout, TensorInfo, TensorSampler,
    TensorSamplerAddressMode, TensorSamplerAddressModeX, TensorShape, TensorStorageType, TileInfo,
    TileOperand, UnaryOp, VariableTable, DYNAMIC_DIM,
};

use super::{load_config, write_output};

#[derive(Args)]
pub struct ElementwiseArgs {
    /// Binary operator applied to src0 and src1
    #[arg(long, default_value = "add")]
    pub op: BinaryOp,
    /// Unary function applied to the result (none, exp, tanh, sqrt, fabs, log, round)
    #[arg(long, default_value = "none")]
    pub activation: String,
    /// Tensor shape, five comma separated dims; -1 marks a dynamic dim
    #[arg(long, default_value = "3,10,20,1,1")]
    pub shape: String,
    /// Element data type
    #[arg(long, default_value = "fp32")]
    pub dtype: DataType,
    /// Tile size as HEIGHTxWIDTH
    #[arg(long, default_value = "4x4")]
    pub tile: String,
    /// How tensors are bound to the kernel
    #[arg(long, value_enum, default_value = "buffer")]
    pub storage: StorageArg,
    /// Boundary handling along Y
    #[arg(long, default_value = "none")]
    pub address_mode_y: TensorSamplerAddressMode,
    /// Overlap the first partial block along X instead of leaving a leftover
    #[arg(long)]
    pub overlapping_min: bool,
    /// Kernel function name
    #[arg(long, default_value = "elementwise")]
    pub name: String,
    /// Writer config file (default: ckw.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Fold static tensor dims to literals
    #[arg(long)]
    pub by_value: bool,
    /// Omit the OpenCL extension preamble
    #[arg(long)]
    pub no_extensions: bool,
    /// Print the kernel and its arguments as JSON
    #[arg(long)]
    pub json: bool,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageArg {
    Buffer,
    Image2d,
}

/// Tensor id of the intermediate passed from the binary component on.
const INTERMEDIATE_ID: i32 = -1;

pub fn cmd_elementwise(args: ElementwiseArgs) {
    let mut config = load_config(args.config.as_deref());
    if args.by_value {
        config = config.with_return_dims_by_value(true);
    }
    if args.no_extensions {
        config = config.with_emit_extensions(false);
    }

    let plan = match Plan::from_args(&args) {
        Ok(plan) => plan,
        Err(msg) => {
            eprintln!("error: {}", msg);
            process::exit(1);
        }
    };

    let mut writer = create_kernel_writer(TargetLanguage::OpenCL, config);
    let kernel = match write_kernel(writer.as_mut(), &plan, &args.name) {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let text = if args.json {
        match serde_json::to_string_pretty(&kernel) {
            Ok(json) => json + "\n",
            Err(e) => {
                eprintln!("error: cannot serialize kernel: {}", e);
                process::exit(1);
            }
        }
    } else {
        kernel.source_code().to_string()
    };
    write_output(args.output.as_ref(), &text);
    eprintln!(
        "Kernel '{}': {} arguments, fingerprint {}",
        args.name,
        kernel.arguments().len(),
        &kernel.fingerprint()[..16]
    );
}

// ─── Plan ─────────────────────────────────────────────────────────

/// Validated command line, ready to drive a writer.
struct Plan {
    op: BinaryOp,
    activation: Option<UnaryOp>,
    shape: TensorShape,
    data_type: DataType,
    tile_height: i32,
    tile_width: i32,
    overlapping_min: bool,
    load_sampler: TensorSampler,
    store_sampler: TensorSampler,
}

impl Plan {
    fn from_args(args: &ElementwiseArgs) -> Result<Self, String> {
        let activation = match args.activation.as_str() {
            "none" => None,
            other => Some(other.parse::<UnaryOp>().map_err(|e| e.to_string())?),
        };
        let shape = parse_shape(&args.shape)?;
        let (tile_height, tile_width) = parse_tile(&args.tile)?;

        let (load_storage, store_storage) = match args.storage {
            StorageArg::Buffer => (
                TensorStorageType::BufferUint8Ptr,
                TensorStorageType::BufferUint8Ptr,
            ),
            StorageArg::Image2d => (
                TensorStorageType::Texture2dReadOnly,
                TensorStorageType::Texture2dWriteOnly,
            ),
        };
        let address_mode_x = if args.overlapping_min {
            TensorSamplerAddressModeX::OverlappingMin
        } else {
            TensorSamplerAddressModeX::None
        };
        let sampler = TensorSampler::default()
            .with_address_mode_x(address_mode_x)
            .with_address_mode_y(args.address_mode_y);

        Ok(Plan {
            op: args.op,
            activation,
            shape,
            data_type: args.dtype,
            tile_height,
            tile_width,
            overlapping_min: args.overlapping_min,
            load_sampler: sampler.with_storage(load_storage),
            store_sampler: sampler.with_storage(store_storage),
        })
    }

    fn tensor(&self, id: i32) -> TensorInfo {
        TensorInfo::new(self.data_type, self.shape, TensorDataLayout::Nhwc, id)
    }

    fn tile_info(&self) -> TileInfo {
        TileInfo::new(self.data_type, self.tile_height, self.tile_width)
    }
}

fn parse_shape(text: &str) -> Result<TensorShape, String> {
    let dims = text
        .split(',')
        .map(|d| d.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid shape '{}': {}", text, e))?;
    let shape: TensorShape = dims
        .try_into()
        .map_err(|_| format!("shape '{}' must have exactly 5 dims", text))?;
    if let Some(bad) = shape.iter().find(|&&d| d != DYNAMIC_DIM && d < 1) {
        return Err(format!("invalid dim {} in shape '{}'", bad, text));
    }
    Ok(shape)
}

fn parse_tile(text: &str) -> Result<(i32, i32), String> {
    let (h, w) = text
        .split_once('x')
        .ok_or_else(|| format!("tile '{}' must look like HEIGHTxWIDTH", text))?;
    let h = h.trim().parse::<i32>().map_err(|e| format!("invalid tile height: {}", e))?;
    let w = w.trim().parse::<i32>().map_err(|e| format!("invalid tile width: {}", e))?;
    Ok((h, w))
}

// ─── Kernel ───────────────────────────────────────────────────────

struct Coordinates {
    x: TileOperand,
    y: TileOperand,
    zero: TileOperand,
}

fn int_const(writer: &mut dyn KernelWriter, value: i32) -> ckw::Result<TileOperand> {
    writer.declare_constant_tile(&ConstantData::scalar(value, DataType::Int32)?)
}

/// Block origin of this work item, shared by every component.
fn declare_coordinates(writer: &mut dyn KernelWriter, plan: &Plan) -> ckw::Result<Coordinates> {
    let zero = int_const(writer, 0)?;
    let mut coord = |axis: &str, dim: i32, step: i32| -> ckw::Result<TileOperand> {
        let gid = writer.declare_tile(&format!("gid_{}", axis), TileInfo::scalar(DataType::Int32))?;
        let tile = writer.declare_tile(axis, TileInfo::scalar(DataType::Int32))?;
        let step = int_const(&mut *writer, step)?;
        writer.op_get_global_id(&gid, dim)?;
        writer.op_binary(&tile, BinaryOp::Mul, &gid, &step)?;
        Ok(tile)
    };
    let x = coord("x", 0, plan.tile_width)?;
    let y = coord("y", 1, plan.tile_height)?;

    // Shift every block left so the first one absorbs the leftover columns.
    if plan.overlapping_min && plan.shape[0] != DYNAMIC_DIM {
        let shift = (plan.tile_width - plan.shape[0] % plan.tile_width) % plan.tile_width;
        if shift != 0 {
            let shift = int_const(writer, shift)?;
            writer.op_binary(&x, BinaryOp::Sub, &x, &shift)?;
            writer.op_binary(&x, BinaryOp::Max, &x, &zero)?;
        }
    }
    Ok(Coordinates { x, y, zero })
}

/// Three fused components: `src0 op src1`, optional activation, store.
fn write_kernel(writer: &mut dyn KernelWriter, plan: &Plan, name: &str) -> ckw::Result<Kernel> {
    let Coordinates { x, y, zero } = declare_coordinates(writer, plan)?;
    let mut vars = VariableTable::new();

    {
        let mut w = ScopedKernelWriter::new(&mut *writer);
        let src0 = vars.declare_variable(&mut *w, plan.tensor(0), "src")?.tensor()?;
        let src1 = vars.declare_variable(&mut *w, plan.tensor(1), "src")?.tensor()?;
        let lhs = w.declare_tile("lhs", plan.tile_info())?;
        let rhs = w.declare_tile("rhs", plan.tile_info())?;
        let dst = w.declare_tile("dst", plan.tile_info())?;
        w.op_load(&lhs, &src0, &plan.load_sampler, &x, &y, &zero, &zero)?;
        w.op_load(&rhs, &src1, &plan.load_sampler, &x, &y, &zero, &zero)?;
        w.op_binary(&dst, plan.op, &lhs, &rhs)?;
        vars.declare_variable(&mut *w, plan.tensor(INTERMEDIATE_ID), "dst")?
            .init_virtual_tensor(dst, plan.load_sampler)?;
    }

    if let Some(activation) = plan.activation {
        let mut w = ScopedKernelWriter::new(&mut *writer);
        let tile = vars.declare_variable(&mut *w, plan.tensor(INTERMEDIATE_ID), "dst")?.tile()?;
        w.op_unary(&tile, activation, &tile)?;
    }

    {
        let mut w = ScopedKernelWriter::new(&mut *writer);
        let result = *vars.declare_variable(&mut *w, plan.tensor(INTERMEDIATE_ID), "dst")?;
        let dst = vars.declare_variable(&mut *w, plan.tensor(2), "dst")?.tensor()?;
        w.op_store(&dst, &result.tile()?, &plan.store_sampler, &x, &y, &zero, &zero)?;
    }

    writer.emit_kernel(name)
}
